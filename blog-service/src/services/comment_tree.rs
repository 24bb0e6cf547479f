//! Assembly of flat comment rows into a reply tree.
//!
//! Comments are fetched for a post in one query; threading happens here.
//! Top-level comments read newest first, replies within a parent read
//! oldest first, and nesting depth is not limited. A comment whose parent
//! is missing from the set is kept by promoting it to the top level.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::Comment;

/// A comment with its ordered replies.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Build the reply forest for one post from its flat comment rows.
pub fn build_forest(comments: Vec<Comment>) -> Vec<CommentNode> {
    let known: HashSet<Uuid> = comments.iter().map(|c| c.comment_id).collect();

    let mut roots: Vec<Comment> = Vec::new();
    let mut children: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    for bucket in children.values_mut() {
        bucket.sort_by_key(|c| c.created_utc);
    }
    roots.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));

    roots
        .into_iter()
        .map(|comment| attach_replies(comment, &mut children))
        .collect()
}

fn attach_replies(comment: Comment, children: &mut HashMap<Uuid, Vec<Comment>>) -> CommentNode {
    let replies = children
        .remove(&comment.comment_id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach_replies(reply, children))
        .collect();
    CommentNode { comment, replies }
}
