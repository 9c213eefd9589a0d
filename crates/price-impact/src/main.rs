#[tokio::main]
async fn main() {
    price_impact::start(std::env::args()).await;
}
