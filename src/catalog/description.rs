/// Derive a caption from a file name.
///
/// Strips the final extension and turns `_` and `-` into spaces:
/// `sunset_over-bay.png` becomes `sunset over bay`. The result is non-empty
/// whenever the name minus its extension is non-empty.
pub fn fallback_description(file: &str) -> String {
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    stem.replace(['_', '-'], " ")
}
