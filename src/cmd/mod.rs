/*!
Subcommand dispatcher module.

Layout:
  src/cmd/
    mod.rs          (this file: module declarations + re-exports)
    connect.rs      (ConnectArgs    + execute_connect)
    disconnect.rs   (DisconnectArgs + execute_disconnect)
    commands.rs     (CommandsArgs   + execute_commands)
    shared.rs       (Session, runtime + prompt helpers, shared messages)
    format.rs       (text layout for listings and help)

Conventions:
  - Each subcommand module exposes one public `execute_*` function taking its
    args and the resolved `Settings`, returning `anyhow::Result<()>`.
  - The work itself lives in a function that writes to `&mut dyn Write`
    (`connect`, `disconnect`, `list_app_commands`) so tests can capture the
    exact lines a user sees.
*/

pub mod commands;
pub mod connect;
pub mod disconnect;
pub mod format;
pub mod shared;

pub use commands::{CommandsArgs, execute_commands};
pub use connect::{ConnectArgs, execute_connect};
pub use disconnect::{DisconnectArgs, execute_disconnect};
