use std::time::Duration;

use signet::prelude::*;
use tokio::sync::mpsc;

/// The token the local verifier knows. A real app gets this from the
/// Google Sign-In SDK after the user picks an account.
const DEMO_TOKEN: &str = "abc123";

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Stands in for the Google Sign-In SDK. "Opening the account picker"
/// hands the sign-in handle to whoever plays the user.
struct DemoProvider {
    picker: mpsc::UnboundedSender<SignInHandle>,
}

impl IdentityProvider for DemoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn request_consent(
        &self,
        handle: SignInHandle,
    ) -> Result<(), ProviderError> {
        println!("  [google] account picker opened for {handle}");
        self.picker
            .send(handle)
            .map_err(|_| ProviderError::Unavailable("account picker closed".into()))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        println!("  [google] signed out");
        Ok(())
    }

    async fn revoke_access(&self) -> Result<(), ProviderError> {
        println!("  [google] access revoked");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

type Manager = SessionManager<DemoProvider, RemoteAuthService>;

fn demo_verifier() -> StaticVerifier {
    StaticVerifier::new().with_token(DEMO_TOKEN, "uid-42", "user@example.com")
}

/// Starts the local exchange server and returns its URL.
async fn start_exchange_server() -> Result<String, Box<dyn std::error::Error>> {
    let server = ExchangeServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(demo_verifier())
        .await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());
    Ok(format!("ws://{addr}"))
}

fn manager(url: String) -> (Manager, mpsc::UnboundedReceiver<SignInHandle>) {
    let (picker, requests) = mpsc::unbounded_channel();
    let manager = SessionManager::new(
        DemoProvider { picker },
        RemoteAuthService::new(url).with_timeout(Duration::from_secs(5)),
        SessionConfig::default().with_consent_timeout(Duration::from_secs(60)),
    );
    (manager, requests)
}

/// One sign-in, with the "user" answering the picker with `answer`.
async fn sign_in(
    manager: &Manager,
    picker: &mut mpsc::UnboundedReceiver<SignInHandle>,
    answer: Result<ProviderToken, ProviderError>,
) -> Result<AuthResult, SignetError> {
    let ticket = manager.begin_sign_in().await?;
    if let Some(handle) = picker.recv().await {
        manager.complete_sign_in(handle, answer).await;
    }
    Ok(ticket.await)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    signet::logging::init();

    let url = start_exchange_server().await?;
    eprintln!("exchange server listening on {url}");
    let (manager, mut picker) = manager(url);

    println!("1. sign in with a valid account");
    let outcome =
        sign_in(&manager, &mut picker, Ok(ProviderToken::from(DEMO_TOKEN))).await?;
    println!("   -> {outcome}");
    println!("   -> sign out: {}", manager.sign_out().await);

    println!("2. user backs out of the picker");
    let outcome =
        sign_in(&manager, &mut picker, Err(ProviderError::UserCancelled)).await?;
    println!("   -> {outcome}");

    println!("3. a forged token");
    let outcome =
        sign_in(&manager, &mut picker, Ok(ProviderToken::from("forged"))).await?;
    println!("   -> {outcome}");

    println!("4. sign in, then revoke access");
    let outcome =
        sign_in(&manager, &mut picker, Ok(ProviderToken::from(DEMO_TOKEN))).await?;
    println!("   -> {outcome}");
    println!("   -> revoke: {}", manager.revoke_access().await);

    println!("final state: {}", manager.current().state());
    Ok(())
}
