use clap::Args;

use crate::config;

#[derive(Debug, Args, Clone)]
pub struct ShopArgs {
    /// Component name, matched case-insensitively
    pub component: String,
}

pub fn run(args: ShopArgs) -> Result<(), String> {
    let links = config::load_shop_links()?;
    match links.lookup(&args.component) {
        Some(link) => {
            println!("{link}");
            Ok(())
        }
        None => Err(format!(
            "No shopping link available for '{}'.",
            args.component
        )),
    }
}
