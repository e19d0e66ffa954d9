use clap::ValueEnum;
use common::Component;

/// Component name accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentArg {
    #[value(name = "db", aliases = ["bd", "database"])]
    Db,
    #[value(name = "app", aliases = ["wordpress", "wp"])]
    App,
}

impl From<ComponentArg> for Component {
    fn from(arg: ComponentArg) -> Component {
        match arg {
            ComponentArg::Db => Component::Database,
            ComponentArg::App => Component::Application,
        }
    }
}
