// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell completion generation for the jo CLI.
//!
//! ```bash
//! jo --completions bash > ~/.local/share/bash-completion/completions/jo
//! jo --completions zsh > ~/.zfunc/_jo
//! jo --completions fish > ~/.config/fish/completions/jo.fish
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Generate shell completions and write to stdout.
pub fn generate_completions<C: CommandFactory>(shell: Shell) {
    let mut cmd = C::command();
    generate(shell, &mut cmd, "jo", &mut io::stdout());
}
