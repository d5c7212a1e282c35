// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::Parser;

use signkit_server::cli;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    cli::handle_command(&args).await;
}
