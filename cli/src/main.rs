//! `tmdb-login`: obtain a TMDb session id and account id from the command line.

mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use tmdb_auth_core::{Authenticator, ClientConfig, HandshakeResult, Session, TmdbClient, DEFAULT_BASE_URL};
use tracing_subscriber::EnvFilter;

use crate::transport::UreqTransport;

/// Log in to The Movie Database and print the session id and account id
#[derive(Parser, Debug)]
#[command(name = "tmdb-login", version, about)]
struct Args {
    /// TMDb username
    #[arg(long, short)]
    username: String,

    /// TMDb password
    #[arg(long, env = "TMDB_PASSWORD", hide_env_values = true)]
    password: String,

    /// API key (v3 auth)
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: String,

    /// API root
    #[arg(long, env = "TMDB_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(args: &Args) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tmdb_login={level},tmdb_auth_core={level},warn",
            level = args.log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn login(args: &Args) -> Result<Session> {
    let config = ClientConfig::new(&args.base_url, &args.api_key).context("invalid configuration")?;
    let mut auth = Authenticator::new(TmdbClient::from_config(&config), UreqTransport::new());

    let mut outcome: Option<HandshakeResult> = None;
    auth.login(&args.username, &args.password, |result| outcome = Some(result));
    let session = outcome.context("login finished without a result")??;
    Ok(session)
}

fn render(session: &Session, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(session).context("failed to encode result");
    }
    Ok(format!(
        "session_id: {}\nuser_id: {}",
        session.session_id, session.user_id
    ))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let session = login(&args)?;
    println!("{}", render(&session, args.json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmdb_auth_core::{SessionId, UserId};

    fn start_mock_server() -> std::net::SocketAddr {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    }

    fn args(base_url: &str, password: &str) -> Args {
        Args::parse_from([
            "tmdb-login",
            "--username",
            "moviefan",
            "--password",
            password,
            "--api-key",
            "test-api-key",
            "--base-url",
            base_url,
        ])
    }

    #[test]
    fn parses_flags() {
        let args = args("http://localhost:3000", "popcorn");
        assert_eq!(args.username, "moviefan");
        assert_eq!(args.base_url, "http://localhost:3000");
        assert_eq!(args.log_level, "warn");
        assert!(!args.json);
    }

    #[test]
    fn renders_plain_and_json() {
        let session = Session {
            session_id: SessionId::new("xyz"),
            user_id: UserId(548),
        };
        assert_eq!(render(&session, false).unwrap(), "session_id: xyz\nuser_id: 548");
        let json: serde_json::Value =
            serde_json::from_str(&render(&session, true).unwrap()).unwrap();
        assert_eq!(json["session_id"], "xyz");
        assert_eq!(json["user_id"], 548);
    }

    #[test]
    fn logs_in_against_mock_server() {
        let addr = start_mock_server();
        let session = login(&args(&format!("http://{addr}"), "popcorn")).unwrap();
        assert_eq!(session.user_id, UserId(548));
    }

    #[test]
    fn wrong_password_is_reported() {
        let addr = start_mock_server();
        let err = login(&args(&format!("http://{addr}"), "butter")).unwrap_err();
        assert!(err.to_string().contains("login failed (login)"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = login(&args("not a url", "popcorn")).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
