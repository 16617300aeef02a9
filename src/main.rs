use std::sync::Arc;

use pageframe::buffer::BufferPoolManager;
use pageframe::common::{AccessType, BufferPoolConfig};
use pageframe::storage::disk::DiskManager;

fn main() {
    tracing_subscriber::fmt::init();

    println!("pageframe - buffer pool core demo");
    println!("==================================\n");

    let db_path = "demo.db";

    let disk_manager = Arc::new(DiskManager::new(db_path).expect("failed to open disk manager"));
    println!("opened disk manager for: {}", db_path);

    let config = BufferPoolConfig::from_env();
    let bpm = BufferPoolManager::from_config(config, disk_manager);
    println!(
        "created buffer pool manager with {} frames (k={})\n",
        bpm.pool_size(),
        config.lru_k
    );

    let page_id = bpm.new_page().expect("failed to allocate page");
    println!("allocated new page: {}", page_id);

    {
        let mut guard = bpm
            .fetch_page_write(page_id, AccessType::Unknown)
            .expect("failed to get write guard");
        let message = b"hello from pageframe";
        guard.data_mut()[..message.len()].copy_from_slice(message);
    }

    bpm.flush_page(page_id).expect("failed to flush page");
    println!("flushed page to disk");

    {
        let guard = bpm
            .fetch_page_read(page_id, AccessType::Unknown)
            .expect("failed to get read guard");
        let message = &guard.data()[..21];
        println!(
            "read back: {:?}",
            String::from_utf8_lossy(message)
        );
    }

    std::fs::remove_file(db_path).ok();
    println!("\ndemo completed successfully");
}
