// Stable tags shared with the host: field kinds and IPC message types.

/// Storage kind of a reflected field. The discriminant is the value reported
/// by `mirror_field_type` and by the `GetTypeInfo` handler.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Bool = 0,
    Int = 1,
    Float = 2,
    Double = 3,
    String = 4,
    Vector2 = 5,
    Vector3 = 6,
    Color = 7,
    Custom = 8,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Bool,
        FieldKind::Int,
        FieldKind::Float,
        FieldKind::Double,
        FieldKind::String,
        FieldKind::Vector2,
        FieldKind::Vector3,
        FieldKind::Color,
        FieldKind::Custom,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Bool => "Bool",
            FieldKind::Int => "Int",
            FieldKind::Float => "Float",
            FieldKind::Double => "Double",
            FieldKind::String => "String",
            FieldKind::Vector2 => "Vector2",
            FieldKind::Vector3 => "Vector3",
            FieldKind::Color => "Color",
            FieldKind::Custom => "Custom",
        }
    }

    /// Kinds the JSON codec reads and writes.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            FieldKind::Bool | FieldKind::Int | FieldKind::Float | FieldKind::Double | FieldKind::String
        )
    }
}

/// Grouping of message types by their role in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageFamily {
    Query,
    Command,
    Response,
    Event,
}

/// IPC message type discriminator.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    // Queries
    GetTypes = 0,
    GetTypeInfo = 1,
    GetSceneObjects = 2,
    GetObjectProperties = 3,

    // Commands
    SetProperty = 4,
    CreateObject = 5,
    DeleteObject = 6,
    LoadScene = 7,
    SaveScene = 8,

    // Responses
    Response = 9,
    Error = 10,

    // Events
    ObjectSelected = 11,
    ObjectModified = 12,
    SceneChanged = 13,
}

impl MessageType {
    pub const ALL: [MessageType; 14] = [
        MessageType::GetTypes,
        MessageType::GetTypeInfo,
        MessageType::GetSceneObjects,
        MessageType::GetObjectProperties,
        MessageType::SetProperty,
        MessageType::CreateObject,
        MessageType::DeleteObject,
        MessageType::LoadScene,
        MessageType::SaveScene,
        MessageType::Response,
        MessageType::Error,
        MessageType::ObjectSelected,
        MessageType::ObjectModified,
        MessageType::SceneChanged,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn family(self) -> MessageFamily {
        match self as u32 {
            0..=3 => MessageFamily::Query,
            4..=8 => MessageFamily::Command,
            9 | 10 => MessageFamily::Response,
            _ => MessageFamily::Event,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::GetTypes => "GetTypes",
            MessageType::GetTypeInfo => "GetTypeInfo",
            MessageType::GetSceneObjects => "GetSceneObjects",
            MessageType::GetObjectProperties => "GetObjectProperties",
            MessageType::SetProperty => "SetProperty",
            MessageType::CreateObject => "CreateObject",
            MessageType::DeleteObject => "DeleteObject",
            MessageType::LoadScene => "LoadScene",
            MessageType::SaveScene => "SaveScene",
            MessageType::Response => "Response",
            MessageType::Error => "Error",
            MessageType::ObjectSelected => "ObjectSelected",
            MessageType::ObjectModified => "ObjectModified",
            MessageType::SceneChanged => "SceneChanged",
        }
    }

    /// Case-insensitive lookup by variant name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}
