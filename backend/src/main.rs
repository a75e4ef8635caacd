/* algopath-bot
 * Copyright (C) 2025 Algopath Community
 *
 * This library is free software; you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public
 * License as published by the Free Software Foundation; either
 * version 2 of the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library; if not, write to the
 * Free Software Foundation, Inc., 59 Temple Place - Suite 330,
 * Boston, MA 02111-1307, USA.
 */

use std::{sync::Arc, time::Duration};

use actix_web::{middleware::Logger, web, App, HttpServer};
pub use backend::*;
use backend::{
    config::BotConfig, discord::api::DiscordRestClient, services::bootstrap,
    utils::get_connection,
};
use db_connector::{get_connection_pool, run_migrations};
use lettre::{transport::smtp::authentication::Credentials, SmtpTransport};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode,
};

#[cfg(not(debug_assertions))]
use simplelog::WriteLogger;

fn cleanup_thread(state: web::Data<AppState>) {
    loop {
        std::thread::sleep(Duration::from_secs(60));

        let mut conn = match get_connection(&state) {
            Ok(c) => c,
            Err(_err) => {
                continue;
            }
        };

        clean_expired_otp_codes(&mut conn);
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap()
        .build();

    #[cfg(not(debug_assertions))]
    let write_logger = WriteLogger::new(
        LevelFilter::Info,
        log_config.clone(),
        std::fs::File::create(format!(
            "/logs/bot-{}.log",
            chrono::Local::now().format("%Y-%m-%d-%H")
        ))
        .unwrap(),
    );

    #[cfg(debug_assertions)]
    CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        log_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .unwrap();

    #[cfg(not(debug_assertions))]
    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            log_config,
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        write_logger,
    ])
    .unwrap();

    dotenvy::dotenv().ok();

    let pool = get_connection_pool();
    let mut conn = pool.get().expect("Failed to get connection from pool");
    run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    let mailer = {
        let email = std::env::var("EMAIL_USER").expect("EMAIL_USER must be set");
        let pass = std::env::var("EMAIL_PASS").expect("EMAIL_PASS must be set");
        let relay = std::env::var("EMAIL_RELAY").expect("EMAIL_RELAY must be set");
        let port: u16 = std::env::var("EMAIL_RELAY_PORT")
            .expect("EMAIL_RELAY_PORT must be set")
            .parse()
            .unwrap();
        SmtpTransport::relay(&relay)
            .unwrap()
            .port(port)
            .credentials(Credentials::new(email, pass))
            .build()
    };

    let config = BotConfig::from_env();
    let token = std::env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN must be set!");
    let chat = Arc::new(DiscordRestClient::new(
        token,
        config.application_id.clone(),
        config.guild_id.clone(),
    ));

    let state = web::Data::new(AppState {
        pool,
        mailer,
        chat,
        config,
    });

    let state_cpy = state.clone();
    std::thread::spawn(move || cleanup_thread(state_cpy));

    bootstrap::register_commands(&state).await;
    bootstrap::post_startup_prompts(&state).await;

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .expect("PORT must be a number");

    log::info!("Listening on 0.0.0.0:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
