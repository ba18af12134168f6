//! # Data Provider
//!
//! The one capability every backend exposes. Hosts hold providers as
//! `Arc<dyn DataProvider>` and pick one by [`DataProvider::name`].

use crate::error::StoreResult;
use ll_core::{QueryParameters, ResultPage};
use tokio_util::sync::CancellationToken;

#[async_trait::async_trait]
pub trait DataProvider: Send + Sync {
    /// Identity used to label this provider among several configured ones.
    fn name(&self) -> &str;

    /// One page of matching entries plus the total match count.
    ///
    /// Returns [`crate::StoreError::Cancelled`] as soon as `cancel` fires;
    /// no partial page is ever returned.
    async fn fetch_data(
        &self,
        params: &QueryParameters,
        cancel: &CancellationToken,
    ) -> StoreResult<ResultPage>;
}
