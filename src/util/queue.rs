use std::collections::VecDeque;

/// A very simple queue of byte chunks. The channel read loop enqueues chunks as they arrive from
/// the transport; channel read operations dequeue them. The queue itself is not synchronized --
/// the channel wraps it in a mutex shared with the read loop thread.
pub struct Queue {
    chunks: VecDeque<Vec<u8>>,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    /// Return an initialized `Queue`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunks: VecDeque::new(),
        }
    }

    /// Re-queue bytes in `b` to the *front* of the queue -- used to push back bytes a consumer
    /// read but did not want to consume (for example the login banner + prompt captured during
    /// in-channel authentication).
    pub fn requeue(
        &mut self,
        b: Vec<u8>,
    ) {
        self.chunks.push_front(b);
    }

    /// Queue bytes in `b` to the *back* of the queue.
    pub fn enqueue(
        &mut self,
        b: Vec<u8>,
    ) {
        self.chunks.push_back(b);
    }

    /// De-queue the oldest chunk from the queue, or an empty vec if there is nothing waiting.
    pub fn dequeue(&mut self) -> Vec<u8> {
        self.chunks.pop_front().unwrap_or_default()
    }

    /// Returns the current depth of the queue.
    pub fn depth(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Queue;

    #[test]
    fn queue_preserves_chunk_order() {
        let mut q = Queue::new();

        q.enqueue(b"one".to_vec());
        q.enqueue(b"two".to_vec());

        assert_eq!(q.depth(), 2);
        assert_eq!(q.dequeue(), b"one".to_vec());
        assert_eq!(q.dequeue(), b"two".to_vec());
        assert_eq!(q.dequeue(), Vec::<u8>::new());
    }

    #[test]
    fn requeue_jumps_the_line() {
        let mut q = Queue::new();

        q.enqueue(b"later".to_vec());
        q.requeue(b"first".to_vec());

        assert_eq!(q.dequeue(), b"first".to_vec());
        assert_eq!(q.dequeue(), b"later".to_vec());
    }
}
