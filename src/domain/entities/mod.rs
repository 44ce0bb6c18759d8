pub mod invoice;
pub mod retrieval;

pub use invoice::InvoiceProjection;
pub use retrieval::{
    DEFAULT_MAX_DISTANCE, DEFAULT_PAGE_LIMIT, RetrievalRequest, RetrievalRoute, RouteState,
};
