//! gitmq - a message broker on top of a shared git repository
//!
//! Producers commit message files to a topic branch and push; consumers pull
//! the same branch, scan the working tree for files newer than their last
//! checkpoint, deliver them as a batch, and commit a new checkpoint marker
//! back to the remote. The remote repository is the broker; a working copy is
//! a disposable replica.
//!
//! # Delivery semantics
//!
//! A consumer commits its checkpoint *before* the caller processes the
//! returned batch. A crash between delivery and application-level processing
//! therefore skips that batch on the next call: at-most-once from the
//! checkpoint forward. This is a deliberate trade-off that keeps the
//! protocol a pure function of the file listing.
//!
//! All coordination is optimistic: a push succeeds only if the local history
//! extends the remote tip. Lost races surface as push rejections and are
//! retried (resynchronize, push again) a bounded number of times.

mod client;
mod consumer;
mod error;
mod producer;
mod retry;

pub use client::BrokerClient;
pub use consumer::Consumer;
pub use error::BrokerError;
pub use producer::Producer;

pub use libgitmq_core::{
    Author, BrokerConfig, Credentials, LogFileName, Message, OrderKeyGenerator, SystemTimeSource,
    TimeSource,
};
pub use libgitmq_git::{GitError, SyncOutcome, WorkingCopy};
