//! MIME type derivation from a file name's extension.

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Map the extension of `file_name` to a MIME type.
///
/// Only the handful of formats the dashboard previews are recognised;
/// anything else (including names without an extension) is a generic binary.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" | "docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        _ => OCTET_STREAM,
    }
}
