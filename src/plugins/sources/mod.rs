// Source adapter implementations
pub mod index_detail;
pub mod paginated;

pub use index_detail::IndexDetailSource;
pub use paginated::PaginatedApiSource;
