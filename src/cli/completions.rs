// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell completion generation

use super::{Cli, Outcome};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

pub fn execute(shell: Shell) -> Outcome {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
    Outcome::Success
}
