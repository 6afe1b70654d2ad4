use std::error::Error;

use dotenvy::dotenv;
use log::info;

use usermgmt::{
    config::Config, create_router, database::connect_repository, seed_superuser, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = Config::from_env()?;

    let repo = connect_repository(&config).await?;
    let state = AppState::new(repo, config.bcrypt_cost);

    if let Some(seed) = &config.superuser {
        seed_superuser(&state, seed).await?;
    }

    let app = create_router(state);

    let addr = config.bind_addr();
    info!("usermgmt server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
