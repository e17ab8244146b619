//! Parsed, read-only views of the XML artifacts.

pub mod mets;
pub mod page;
mod workspace;

pub use mets::{Agent, FileGroup, FileLocation, MetsFile, WorkspaceDescriptor};
pub use page::{PageDocument, Point, Polygon, ReadingOrderRef, Region, TextLine, Word};
pub use workspace::Workspace;
