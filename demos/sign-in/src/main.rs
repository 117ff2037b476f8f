//! Signs in to a HUMANIQ API and prints who you are.
//!
//! ```text
//! HUMANIQ_API_URL=http://localhost:5000/api \
//! HUMANIQ_TOKEN_FILE=.humaniq-session.json \
//!     cargo run -p sign-in -- ana@escola.br segredo
//! ```
//!
//! With a token file, the second run restores the session without
//! asking for credentials. Pass `--logout` to forget it.

use humaniq::prelude::*;
use humaniq::telemetry;

fn print_user(user: &User) {
    println!("signed in as {} <{}> ({})", user.name, user.email, user.role);
    println!(
        "  level {} · {} xp · {} challenges completed",
        user.level, user.xp, user.challenges_completed
    );
    if let Some(class) = &user.class {
        println!("  class: {} (code {})", class.name, class.code);
    }
    if !user.assessment_completed {
        println!("  the initial assessment is still pending");
    }
}

#[tokio::main]
async fn main() -> Result<(), HumaniqError> {
    telemetry::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let client = HumaniqClient::builder()
        .config(ClientConfig::from_env()?)
        .build();

    if args.iter().any(|a| a == "--logout") {
        client.session().logout();
        println!("signed out");
        return Ok(());
    }

    let status = client.start().await;
    tracing::debug!(%status, "startup check finished");

    let user = match client.session().current_user() {
        Some(user) => user,
        None => {
            let [email, secret] = args.as_slice() else {
                eprintln!("usage: sign-in <email> <password> | --logout");
                std::process::exit(2);
            };
            match client.session().login(email, secret).await {
                Ok(user) => user,
                Err(error) => {
                    eprintln!("{error}");
                    std::process::exit(1);
                }
            }
        }
    };

    print_user(&user);
    match client.guard(Guard::RoleRequired(Role::Teacher)) {
        GuardDecision::Render => println!("teacher views are available"),
        GuardDecision::Redirect(home) => println!("home view: {home}"),
        GuardDecision::Loading => {}
    }
    Ok(())
}
