//! Builtin intent table
//!
//! Registration order matters: it is the last tie-break between candidates
//! with equal scores.

use crate::types::IntentCategory::{self, FileOp, GitOp, SystemOp};
use crate::types::SlotType::{self, FreeText, Identifier, Path, Quantity};

/// Version of the registry table format accepted by the loader
pub const BUILTIN_TABLE_VERSION: u32 = 1;

type SlotEntry = (&'static str, SlotType, Option<&'static str>);

pub struct BuiltinIntent {
    pub id: &'static str,
    pub category: IntentCategory,
    pub description: &'static str,
    pub triggers: &'static [&'static str],
    pub required: &'static [SlotEntry],
    pub optional: &'static [SlotEntry],
}

pub const BUILTIN_INTENTS: &[BuiltinIntent] = &[
    // File operations
    BuiltinIntent {
        id: "list-directory",
        category: FileOp,
        description: "List the contents of a directory",
        triggers: &[
            "list files",
            "show files",
            "show me all files",
            "list files in {path}",
            "show files in directory",
            "list directory contents",
            "what files are here",
            "ls",
            "ls {path}",
        ],
        required: &[],
        optional: &[("path", Path, Some("."))],
    },
    BuiltinIntent {
        id: "print-working-directory",
        category: FileOp,
        description: "Show the current working directory",
        triggers: &[
            "show current directory",
            "print working directory",
            "where am i",
            "pwd",
        ],
        required: &[],
        optional: &[],
    },
    BuiltinIntent {
        id: "change-directory",
        category: FileOp,
        description: "Change the current working directory",
        triggers: &[
            "change directory to {path}",
            "go to {path}",
            "cd {path}",
            "switch to directory {path}",
            "enter {path}",
        ],
        required: &[("path", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "make-directory",
        category: FileOp,
        description: "Create a new directory",
        triggers: &[
            "create a new directory called {name}",
            "make directory {name}",
            "create folder {name}",
            "new folder {name}",
            "mkdir {name}",
        ],
        required: &[("name", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "create-file",
        category: FileOp,
        description: "Create an empty file",
        triggers: &[
            "create file {name}",
            "create a new file called {name}",
            "make a new file {name}",
            "touch {name}",
        ],
        required: &[("name", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "delete-file",
        category: FileOp,
        description: "Move a file to the trash",
        triggers: &[
            "delete {path}",
            "delete file {path}",
            "trash {path}",
            "move {path} to the trash",
        ],
        required: &[("path", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "remove-file",
        category: FileOp,
        description: "Permanently remove a file",
        triggers: &[
            "remove {path}",
            "remove file {path}",
            "delete {path}",
            "permanently delete {path}",
            "rm {path}",
        ],
        required: &[("path", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "delete-directory",
        category: FileOp,
        description: "Remove a directory and its contents",
        triggers: &[
            "delete directory {path}",
            "remove directory {path}",
            "delete folder {path}",
            "rmdir {path}",
        ],
        required: &[("path", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "display-file",
        category: FileOp,
        description: "Print the contents of a file",
        triggers: &[
            "show the content of {path}",
            "display {path}",
            "print file {path}",
            "read {path}",
            "cat {path}",
        ],
        required: &[("path", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "copy-file",
        category: FileOp,
        description: "Copy a file",
        triggers: &[
            "copy {source} to {destination}",
            "duplicate {source} as {destination}",
            "cp {source} {destination}",
        ],
        required: &[("source", Path, None), ("destination", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "move-file",
        category: FileOp,
        description: "Move or rename a file",
        triggers: &[
            "move {source} to {destination}",
            "rename {source} to {destination}",
            "mv {source} {destination}",
        ],
        required: &[("source", Path, None), ("destination", Path, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "find-files",
        category: FileOp,
        description: "Find files matching a name pattern",
        triggers: &[
            "find files named {pattern}",
            "find all {pattern} files",
            "search for files called {pattern}",
            "locate {pattern}",
        ],
        required: &[("pattern", FreeText, None)],
        optional: &[("path", Path, Some("."))],
    },
    BuiltinIntent {
        id: "search-text",
        category: FileOp,
        description: "Search for text inside files",
        triggers: &[
            "search for {text} in {path}",
            "find text {text} in {path}",
            "grep {text} {path}",
        ],
        required: &[("text", FreeText, None)],
        optional: &[("path", Path, Some("."))],
    },
    BuiltinIntent {
        id: "find-large-files",
        category: FileOp,
        description: "Find files larger than a size",
        triggers: &[
            "find files larger than {size}",
            "show files bigger than {size}",
            "list large files over {size}",
        ],
        required: &[("size", Quantity, None)],
        optional: &[("path", Path, Some("."))],
    },
    // System operations
    BuiltinIntent {
        id: "disk-usage",
        category: SystemOp,
        description: "Show disk usage",
        triggers: &[
            "show disk usage",
            "check disk space",
            "how much disk space is left",
            "df",
        ],
        required: &[],
        optional: &[],
    },
    BuiltinIntent {
        id: "memory-usage",
        category: SystemOp,
        description: "Show memory usage",
        triggers: &[
            "show memory usage",
            "check memory",
            "how much ram is free",
            "free memory",
        ],
        required: &[],
        optional: &[],
    },
    BuiltinIntent {
        id: "list-processes",
        category: SystemOp,
        description: "List running processes",
        triggers: &[
            "list processes",
            "show running processes",
            "show top {count} processes",
            "ps",
        ],
        required: &[],
        optional: &[("count", Quantity, None)],
    },
    BuiltinIntent {
        id: "kill-process",
        category: SystemOp,
        description: "Terminate a process",
        triggers: &[
            "kill process {process}",
            "stop process {process}",
            "end task {process}",
            "kill {process}",
        ],
        required: &[("process", Identifier, None)],
        optional: &[],
    },
    // Git operations
    BuiltinIntent {
        id: "git-status",
        category: GitOp,
        description: "Show the working tree status",
        triggers: &["git status", "check git status", "show changes", "what changed"],
        required: &[],
        optional: &[],
    },
    BuiltinIntent {
        id: "git-commit",
        category: GitOp,
        description: "Commit staged changes",
        triggers: &[
            "commit changes with message {message}",
            "commit with message {message}",
            "git commit {message}",
        ],
        required: &[("message", FreeText, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "git-create-branch",
        category: GitOp,
        description: "Create a new branch",
        triggers: &[
            "create branch {branch}",
            "create a new branch called {branch}",
            "new branch {branch}",
            "git branch {branch}",
        ],
        required: &[("branch", Identifier, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "git-switch-branch",
        category: GitOp,
        description: "Switch to another branch",
        triggers: &[
            "switch to branch {branch}",
            "change branch to {branch}",
            "git checkout {branch}",
            "checkout {branch}",
        ],
        required: &[("branch", Identifier, None)],
        optional: &[],
    },
    BuiltinIntent {
        id: "git-log",
        category: GitOp,
        description: "Show commit history",
        triggers: &[
            "show git log",
            "show commit history",
            "show last {count} commits",
            "git log",
        ],
        required: &[],
        optional: &[("count", Quantity, None)],
    },
    BuiltinIntent {
        id: "git-pull",
        category: GitOp,
        description: "Fetch and merge remote changes",
        triggers: &["git pull", "pull latest changes", "pull changes"],
        required: &[],
        optional: &[],
    },
    BuiltinIntent {
        id: "git-push",
        category: GitOp,
        description: "Push commits to the remote",
        triggers: &["git push", "push changes", "push to {branch}"],
        required: &[],
        optional: &[("branch", Identifier, None)],
    },
];
