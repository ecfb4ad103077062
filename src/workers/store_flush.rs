use crate::store::Store;

/// 定期将 sled 数据刷盘
pub async fn run(store: &Store) {
    tracing::debug!("store_flush: start");
    match store.flush() {
        Ok(()) => tracing::debug!("store_flush: done"),
        Err(e) => tracing::error!(error=%e, "store_flush failed"),
    }
}
