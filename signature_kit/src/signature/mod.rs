//! Signature files: model, parser, serializer and differ

pub mod diff;
pub mod model;
pub mod parser;
pub mod writer;

pub use diff::{diff, ChangeKind, ChangedElement, DiffResult};
pub use model::{
    ApiElement, ElementKey, ElementKind, KeyCategory, Nullability, Parameter, SignatureFile,
};
pub use parser::{parse, ParseOptions, HEADER_PREFIX, SUPPORTED_VERSIONS};
pub use writer::{serialize, SerializeOptions};
