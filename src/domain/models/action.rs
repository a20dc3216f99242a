use super::RunRequest;

pub enum Action {
    AgentAbort(),
    AgentRun(RunRequest),
}
