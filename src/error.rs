use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum TraceError {
    /// Packed bounds string did not match `[x1,y1][x2,y2]`
    MalformedBounds { value: String },

    /// Node lacks `bounds` or `class`, so validity cannot be evaluated
    MissingRequiredField { node_id: usize, field: &'static str },

    /// Screenshot stayed undecodable after every retry
    CaptureRetryExhausted { ui_no: usize, attempts: u32 },

    /// adb (or another device command) could not be spawned
    DeviceSpawn { command: String, source: std::io::Error },

    /// Device command ran but failed or produced unusable output
    DeviceIo { command: String, message: String },

    /// Hierarchy document does not have the expected root
    InvalidHierarchy(String),

    /// XML dump could not be parsed
    XmlParse { context: String, source: quick_xml::Error },

    /// JSON parsing failed
    JsonParse { context: String, source: serde_json::Error },

    /// Filesystem read/write failed
    Io { path: PathBuf, source: std::io::Error },

    /// Image decode failed
    Image { path: PathBuf, source: image::ImageError },

    /// Terminal surface failure
    Surface(String),

    /// Invalid configuration or gesture script
    Config(String),
}

impl TraceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(context: impl ToString, source: serde_json::Error) -> Self {
        TraceError::JsonParse {
            context: context.to_string(),
            source,
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::MalformedBounds { value } => {
                write!(f, "Malformed bounds string '{}' (expected [x1,y1][x2,y2])", value)
            }
            TraceError::MissingRequiredField { node_id, field } => {
                write!(f, "Node {} is missing required field '{}'", node_id, field)
            }
            TraceError::CaptureRetryExhausted { ui_no, attempts } => {
                write!(
                    f,
                    "Screenshot for screen {} unreadable after {} attempts",
                    ui_no, attempts
                )
            }
            TraceError::DeviceSpawn { command, source } => {
                write!(f, "Failed to spawn '{}' (is adb installed?): {}", command, source)
            }
            TraceError::DeviceIo { command, message } => {
                write!(f, "Device command '{}' failed: {}", command, message)
            }
            TraceError::InvalidHierarchy(msg) => {
                write!(f, "Invalid hierarchy document: {}", msg)
            }
            TraceError::XmlParse { context, source } => {
                write!(f, "XML parse error ({}): {}", context, source)
            }
            TraceError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            TraceError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            TraceError::Image { path, source } => {
                write!(f, "Unreadable image {}: {}", path.display(), source)
            }
            TraceError::Surface(msg) => {
                write!(f, "Surface error: {}", msg)
            }
            TraceError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::DeviceSpawn { source, .. } => Some(source),
            TraceError::XmlParse { source, .. } => Some(source),
            TraceError::JsonParse { source, .. } => Some(source),
            TraceError::Io { source, .. } => Some(source),
            TraceError::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}
