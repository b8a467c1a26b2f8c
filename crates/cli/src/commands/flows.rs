// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `list-flows` / `show-flow` — the DAG flow catalog.

use crate::output::{self, OutputFormat};
use clap::Args;

pub fn list_flows(format: OutputFormat) -> ! {
    let names = minion_flow::registry::global().list_flows();
    output::succeed(&names, format, None);
}

#[derive(Args)]
pub struct ShowFlowArgs {
    name: String,
    /// Stage to mark with the cursor in the rendered outline
    #[arg(long, default_value = "")]
    current: String,
}

pub fn show_flow(args: ShowFlowArgs, format: OutputFormat) -> ! {
    match minion_flow::registry::global().load(&args.name) {
        Ok(flow) => {
            let rendered = flow.render_dag(&args.current);
            output::succeed(&rendered, format, Some(rendered.clone()));
        }
        Err(e) => output::fail(e),
    }
}
