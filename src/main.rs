#[tokio::main]
async fn main() {
    slotbook_backend::run().await;
}
