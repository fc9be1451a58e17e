pub mod store;
pub mod toolkit;

pub use store::{
    DEFAULT_EXTENSION, InMemoryTemplateStore, SharedTemplateData, StoreError, TemplateStore,
    stored_template_name,
};
pub use toolkit::{
    EncryptionAlgorithm, EncryptionOptions, FormHandle, Permissions, PdfToolkit, ToolkitError,
};
