use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::table::{Align, Table};
use crate::cmd::{with_credential, Action, Failure, Outcome, Run};
use crate::model::Topic;
use crate::service::ApiClient;
use crate::{Config, Console, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ListOpt {
    /// Category of topics. The server does not filter by category, so all topics are listed
    #[structopt(short, long)]
    category: Option<String>,
}

impl Run for ListOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        with_credential(conf, |credential| {
            if let Some(category) = &self.category {
                cnsl.warn(&format!(
                    "Filtering by category is not supported. Listing all topics instead of {}.",
                    category
                ))?;
            }
            let api = ApiClient::new(conf.build_client()?, conf);
            match api.list_topics(credential, cnsl) {
                Ok(topics) => Ok(Box::new(ListOutcome { topics })),
                Err(err) => Ok(Box::new(Failure::from_api(err, Action::ListTopics)?)),
            }
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListOutcome {
    topics: Vec<Topic>,
}

impl fmt::Display for ListOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut table = Table::new(&[
            ("ID", Align::Left),
            ("Title", Align::Left),
            ("Teams", Align::Right),
            ("Entered", Align::Left),
        ]);
        for topic in &self.topics {
            table.push_row(vec![
                topic.id().to_string(),
                topic.title().to_owned(),
                topic.team_count().to_string(),
                if topic.is_entered() { "Yes" } else { "No" }.to_owned(),
            ]);
        }
        write!(f, "{}", table)
    }
}

impl Outcome for ListOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
