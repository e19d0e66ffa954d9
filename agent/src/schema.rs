use common::{Result, siteconfig};

pub fn run() -> Result<()> {
    println!("{}", siteconfig::schema()?);
    Ok(())
}
