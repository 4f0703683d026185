//! Prints an argon2 hash for seeding `users.password_hash`.
//!
//! Usage: `hash-password <password>` or pipe the password on stdin.

use std::io::{self, BufRead};

fn main() -> anyhow::Result<()> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        anyhow::bail!("no password given");
    }

    let hash = club_registry::auth::hash_password(password)
        .map_err(|e| anyhow::anyhow!("could not hash password: {e}"))?;
    println!("{hash}");
    Ok(())
}
