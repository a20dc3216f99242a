use tui_textarea::Input;

use super::StreamChunk;

/// Events consumed by the playground loop. Run events carry the local run id
/// of the invocation that produced them.
pub enum Event {
    RunChunk(u64, StreamChunk),
    RunFailed(u64, String),
    RunFinished(u64),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
