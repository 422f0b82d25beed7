//! Reusable buffers for hot-path string composition
//!
//! Path composition, lookup walks, and signature building all need
//! short-lived strings. Callers own a `Scratch` for the whole session and
//! pass it into read queries so those temporaries recycle a small pool
//! instead of allocating per call.

/// A pool of reusable string buffers
#[derive(Debug, Default)]
pub struct Scratch {
    pool: Vec<String>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a cleared buffer from the pool
    pub fn take(&mut self) -> String {
        match self.pool.pop() {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => String::new(),
        }
    }

    /// Return a buffer to the pool for reuse
    pub fn put(&mut self, buf: String) {
        self.pool.push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_recycle() {
        let mut scratch = Scratch::new();
        let mut buf = scratch.take();
        buf.push_str("some path work");
        let capacity = buf.capacity();
        scratch.put(buf);

        let reused = scratch.take();
        assert!(reused.is_empty());
        assert_eq!(reused.capacity(), capacity);
    }
}
