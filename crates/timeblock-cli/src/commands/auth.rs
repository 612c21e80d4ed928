use clap::Subcommand;
use timeblock_core::{Config, CredentialProvider, GoogleAuth};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store OAuth client credentials and run the browser flow
    Login {
        /// OAuth client id
        #[arg(long)]
        client_id: String,
        /// OAuth client secret
        #[arg(long)]
        client_secret: String,
    },
    /// Force fresh credential acquisition
    Refresh,
    /// Check authentication status
    Status,
    /// Remove cached tokens
    Logout,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let auth = GoogleAuth::new(config.oauth_redirect_port);

    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => {
            GoogleAuth::set_client_credentials(&client_id, &client_secret)?;
            auth.credential(true)?;
            println!("Google authenticated");
        }
        AuthAction::Refresh => {
            auth.credential(true)?;
            println!("Token refreshed");
        }
        AuthAction::Status => match auth.credential(false) {
            Ok(credential) => match credential.expires_at {
                Some(expiry) => println!("authenticated (token valid until {expiry})"),
                None => println!("authenticated"),
            },
            Err(e) => println!("not authenticated: {e}"),
        },
        AuthAction::Logout => {
            auth.clear()?;
            println!("Signed out; cached tokens removed");
        }
    }
    Ok(())
}
