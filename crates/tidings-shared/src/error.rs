use thiserror::Error;

/// Error surfaced to the caller of any client operation.
///
/// Every variant is recoverable by user retry; none leaves partial state
/// except `Transport` between the two writes of a send.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ChatError {
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn transport(msg: impl std::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message content is empty")]
    EmptyContent,

    #[error("Media message has no reference")]
    MissingMediaRef,

    #[error("Coordinates out of range")]
    InvalidCoordinates,

    #[error("Only text messages can be edited")]
    NotEditable,

    #[error("Cannot start a chat with yourself")]
    SelfTarget,

    #[error("A direct chat with this contact already exists")]
    DuplicateChat,

    #[error("Contact is already a member of this chat")]
    DuplicateMember,

    #[error("User is not a member of this chat")]
    NotAMember,

    #[error("Cannot remove the last member of a chat")]
    LastMember,

    #[error("Group name is required")]
    EmptyGroupName,

    #[error("A group needs at least one member besides its creator")]
    NoGroupMembers,

    #[error("Membership of a direct chat cannot change")]
    DirectChatMembership,

    #[error("Upload is empty")]
    EmptyUpload,

    #[error("Upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },

    #[error("Email address is invalid")]
    InvalidEmail,

    #[error("A user with this email already exists")]
    DuplicateUser,
}

pub type Result<T> = std::result::Result<T, ChatError>;
