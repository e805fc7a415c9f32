use owo_colors::OwoColorize;

use transplant_utils::derive_with;

use crate::commands::EnvironmentArgs;

pub struct PathsHandler;

impl PathsHandler {
    pub fn handle(environment: &EnvironmentArgs) {
        let runtime = environment.runtime();
        let paths = derive_with(&runtime.prefix, runtime.platform(), &environment.templates());

        println!("{:<9}{}", "prefix".bright_black(), runtime.prefix);
        println!("{:<9}{:?}", "platform".bright_black(), runtime.platform());
        println!("{:<9}{}", "org".bright_black(), paths.org.bright_cyan());
        println!("{:<9}{}", "confdir".bright_black(), paths.confdir);
        println!("{:<9}{}", "vardir".bright_black(), paths.vardir);
    }
}
