#[tokio::main]
async fn main() {
    proxy::start(std::env::args()).await;
}
