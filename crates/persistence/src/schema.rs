//! Generated header layout

/// Include guard of the generated header
pub const HEADER_GUARD: &str = "GIT_VERSION_H";

/// Macro the firmware reads the revision from
pub const HASH_MACRO: &str = "GIT_HASH";

/// Render the header for `hash`.
///
/// The output is byte-for-byte stable: guard, define, hash macro, `#endif`,
/// each on its own line with a trailing newline.
pub fn render_header(hash: &str) -> String {
    format!(
        "#ifndef {guard}\n#define {guard}\n#define {macro_name} \"{hash}\"\n#endif\n",
        guard = HEADER_GUARD,
        macro_name = HASH_MACRO,
    )
}
