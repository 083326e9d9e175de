//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Write paths open one transaction each; sequence and stock rows are
//! locked with `SELECT ... FOR UPDATE` before being read-modified-written.

pub mod document;
pub mod product;
pub mod sequence;
pub mod stock;

pub use document::{
    CreateDocumentInput, DocumentFilter, DocumentRepository, DocumentWithItems,
    DocumentWriteError, UpdateDocumentInput,
};
pub use product::{CreateProductInput, ProductError, ProductRepository};
pub use sequence::{
    CreateSubtypeInput, SequenceRepository, SubtypeError, UpdateSubtypeInput,
};
pub use stock::{
    MovementFilter, SetInitialStockInput, StockAdjustmentInput, StockLedgerError, StockRepository,
    StockTransferInput, TransferOutcome,
};
