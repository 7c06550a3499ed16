use crate::library::NodeType;
use thiserror::Error;

/// Reasons a proposed connection is refused by the graph.
///
/// These are expected interaction feedback rather than failures: the connection state
/// machine swallows them and leaves the graph untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyViolation {
    #[error("Node '{0}' cannot be connected to itself")]
    SelfLoop(String),

    #[error("A connection from '{source_key}' to '{target_key}' already exists")]
    Duplicate {
        source_key: String,
        target_key: String,
    },

    #[error(
        "A connection from '{target_key}' back to '{source_key}' already exists, so '{source_key}' -> '{target_key}' would form a loop"
    )]
    ReverseLoop {
        source_key: String,
        target_key: String,
    },

    #[error("Node '{0}' does not exist in the graph")]
    UnknownNode(String),

    #[error("Node '{0}' is of a type that accepts no incoming connections")]
    TargetHasNoInputs(String),
}

/// Errors that abort the import of a manifest document. No partial graph is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    #[error("Manifest root must be a mapping, but found {0}")]
    NotAMapping(&'static str),

    #[error("Top-level section '{section}' must be a mapping, but found {found}")]
    InvalidSection {
        section: String,
        found: &'static str,
    },

    #[error("Invalid protocol \"{protocol}\" found in port '{port}' of service '{service}'")]
    InvalidPortProtocol {
        service: String,
        port: String,
        protocol: String,
    },

    #[error("Invalid mount type \"{mount_type}\" found in volumes of service '{service}'")]
    InvalidMountType { service: String, mount_type: String },

    #[error("Invalid access mode \"{mode}\" found in volumes of service '{service}'")]
    InvalidAccessMode { service: String, mode: String },
}

/// Errors produced while asking the generation service for manifest text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Could not reach the generation service: {0}")]
    Transport(String),

    #[error("Generation service answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generation service reported an error: {0}")]
    Service(String),

    #[error("Generation service response could not be decoded: {0}")]
    Decode(String),
}

/// Errors raised while loading a node-type library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("Failed to parse node library JSON: {0}")]
    Parse(String),

    #[error("Node library does not declare the required node type '{0}'")]
    MissingType(NodeType),

    #[error("Node type '{node_type}' cannot declare {inputs} inputs")]
    InvalidArity { node_type: NodeType, inputs: u32 },
}

/// Errors from reading, writing or persisting project documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Failed to decode project document: {0}")]
    Decode(String),

    #[error("Failed to encode project document: {0}")]
    Encode(String),

    #[error("Project store failure: {0}")]
    Store(String),
}

/// Errors raised while loading runtime settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Environment variable '{var}' has an invalid value '{value}'")]
    InvalidEnv { var: String, value: String },
}
