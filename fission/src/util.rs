// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Small helpers shared across the crate.

/// Strips module paths from a type name, keeping generic structure.
///
/// `std::any::type_name` returns fully qualified names like
/// `alloc::sync::Arc<my_app::events::Position>`; reaction identifiers and log lines
/// only want `Arc<Position>`.
#[must_use]
pub fn tidy_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment_start = 0;
    for (index, ch) in name.char_indices() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' => {
                out.push_str(last_path_segment(&name[segment_start..index]));
                out.push(ch);
                segment_start = index + ch.len_utf8();
            }
            _ => {}
        }
    }
    out.push_str(last_path_segment(&name[segment_start..]));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// [`tidy_type_name`] applied to the type parameter.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> String { tidy_type_name(std::any::type_name::<T>()) }
