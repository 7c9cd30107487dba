use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (COFFEE_JWT_SECRET, COFFEE_PAYSTACK_SECRET) are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "COFFEE_HOST",
        "COFFEE_PORT",
        "COFFEE_DATABASE_URL",
        "COFFEE_DB_MAX_CONNECTIONS",
        "COFFEE_JWT_EXPIRY_HOURS",
        "COFFEE_USE_X_FORWARDED_FOR",
        "COFFEE_USE_FORWARDED",
        "COFFEE_WEBHOOK_IP_WHITELIST",
        "COFFEE_PAYSTACK_HMAC_CHECKS",
        "COFFEE_PAYMENT_PROVIDER",
        "COFFEE_PAYSTACK_BASEURL",
        "COFFEE_PAYSTACK_TIMEOUT",
        "COFFEE_UNPAID_ORDER_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
