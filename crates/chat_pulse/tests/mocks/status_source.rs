use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use chat_pulse::{
    twitch::StatusSource,
    types::{HelixStream, HelixUser},
};
use tokio::sync::Notify;

#[derive(Clone)]
pub enum Step {
    Live,
    Offline,
    /// The channel does not exist
    Missing,
    Fail(String),
    /// Waits for the notify before answering live or offline
    Gated(Arc<Notify>, bool),
}

#[derive(Clone, Default)]
pub struct ScriptedStatusSource {
    pub steps: Arc<Mutex<VecDeque<Step>>>,
    pub polls: Arc<AtomicUsize>,
}

impl ScriptedStatusSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn stream() -> HelixStream {
        HelixStream {
            id: "stream-1".into(),
            user_id: "42".into(),
            user_login: "acme".into(),
            title: "Building a chat recorder".into(),
            game_name: "Software and Game Development".into(),
            viewer_count: 128,
            started_at: None,
        }
    }
}

impl StatusSource for ScriptedStatusSource {
    type Error = String;

    async fn lookup_user(&self, login: &str) -> Result<Option<HelixUser>, Self::Error> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut steps = self.steps.lock().unwrap();
        match steps.front() {
            None => Err("script exhausted".to_string()),
            Some(Step::Missing) => {
                steps.pop_front();
                Ok(None)
            }
            Some(Step::Fail(_)) => match steps.pop_front() {
                Some(Step::Fail(msg)) => Err(msg),
                _ => unreachable!(),
            },
            Some(_) => Ok(Some(HelixUser {
                id: "42".into(),
                login: login.to_string(),
                display_name: login.to_string(),
            })),
        }
    }

    async fn lookup_stream(&self, _user_id: &str) -> Result<Option<HelixStream>, Self::Error> {
        let step = self.steps.lock().unwrap().pop_front();
        let is_live = match step {
            Some(Step::Live) => true,
            Some(Step::Offline) => false,
            Some(Step::Gated(notify, is_live)) => {
                notify.notified().await;
                is_live
            }
            _ => return Err("unexpected stream lookup".to_string()),
        };
        Ok(is_live.then(Self::stream))
    }
}
