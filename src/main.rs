#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    lekhak_server::run().await?;
    Ok(())
}
