//! Remote and local entity families
//!
//! Every synchronized concept has a remote value (decoded snapshot) and a
//! local record (store-resident, mutable). Local records carry a storage
//! guid that is never used for matching, the remote fields, locally-owned
//! fields, and links to their parent records.

pub mod local;
pub mod remote;
pub mod value;

pub use local::{LocalEvent, LocalPerformance, LocalVenue, PerformanceLifecycle};
pub use remote::{ListingStatus, RemoteEvent, RemotePerformance, RemoteVenue};
pub use value::{stored_precision, Column, ColumnType, Row, RowReader, Value};

use crate::status::EntityKind;
use uuid::Uuid;

/// A store-resident record
///
/// `COLUMNS` always starts with `guid`; `to_row`/`from_row` follow the
/// same order.
pub trait LocalModel: Clone + Send + Sync + std::fmt::Debug + 'static {
    const KIND: EntityKind;
    const COLUMNS: &'static [Column];

    fn guid(&self) -> Uuid;

    fn to_row(&self) -> Row;

    fn from_row(row: Row) -> fest_common::Result<Self>;

    fn column_index(name: &str) -> Option<usize> {
        Self::COLUMNS.iter().position(|column| column.name == name)
    }
}
