pub(super) const ROOT_LONG_ABOUT: &str = "\
Synchronize local file trees with a ZooKeeper namespace

zktree mirrors a local directory tree into a subtree of ZooKeeper nodes and back. It is
meant for operators who distribute configuration files to a fleet through a shared
coordination tree.

CORE CONCEPTS:

  Directory and file nodes:
    A node with an empty payload stands for a directory; a node with a payload stands
    for a file whose content is the payload. A local directory maps to an empty node and
    a local file to a node holding the file's bytes. Relative paths are identical on
    both sides: LOCAL/a/b.toml corresponds to REMOTE/a/b.toml.

  Optimistic concurrency:
    Overwrites and deletes are conditioned on the node version read just before. If
    someone else changed the node in between, the run stops with a version conflict
    instead of clobbering their change. Nothing is retried.

  Idempotent re-runs:
    A failed run is not rolled back. Running it again is cheap: existing directory
    nodes are kept, identical files are not rewritten, and downloaded files carry the
    node's timestamp so unchanged files are skipped next time.

COMMANDS:

  upload
    Push a local tree to the remote namespace, creating missing nodes and
    overwriting file nodes whose content differs. With --delete, the remote subtree
    is removed first.

  download
    Pull a remote subtree into a local directory. Files are only written when the
    remote node is newer than the local file.

  delete
    Recursively remove a remote subtree, children before parents.

CONNECTION:

  --servers host:port[,host:port...]   ZooKeeper ensemble (default localhost:2181)
  --auth user:password                 digest credentials for the session
  --timeout SECONDS                    session timeout (default 5)
  --config FILE                        TOML file with the settings above

  Flags override values from the config file.

EXAMPLES:

  # Publish the configuration directory
  $ zktree --servers zk1:2181,zk2:2181 upload /fleet/conf ./conf

  # Replace the remote tree entirely
  $ zktree upload --delete /fleet/conf ./conf

  # Fetch it on a host
  $ zktree -v download /fleet/conf /etc/fleet

For detailed help on any command, use:
  zktree <command> --help
";

pub(super) const CONFIG_LONG_HELP: &str = "\
Read settings from a TOML file

Recognized keys (all optional):

  servers = [\"zk1:2181\", \"zk2:2181\"]
  auth = \"user:password\"
  timeout-secs = 5
  acl = \"creator-all\"      # or \"open\"
  dir-mode = 0o744
  file-mode = 0o644

acl defaults to creator-all when credentials are given and open otherwise.
dir-mode and file-mode apply to local directories and files created by download.";

pub(super) const UPLOAD_LONG_ABOUT: &str = "\
Push a local tree to the remote namespace

The remote root and all of its ancestors are created first. The local tree is then
walked with parents before children, and for every entry:

  - directory: the node is created with an empty payload if missing. An existing
    directory node is left alone.
  - file: the node is created with the file's content if missing. If it exists
    with different content it is overwritten, conditioned on the version just read.
    Identical content is not rewritten.
  - anything else (symlinks, FIFOs, sockets, devices): a warning is logged and the
    entry is skipped.

The run stops with an error when a local file meets a remote node that has children,
when a local directory meets a node that holds file content, or when a node is
modified concurrently.

Empty local files are stored as empty nodes and therefore read back as directories.

With --delete, the remote subtree is recursively deleted before uploading, so
remote nodes without a local counterpart disappear.

EXAMPLES:

  $ zktree upload /fleet/conf ./conf
  $ zktree upload --delete /fleet/conf ./conf
";

pub(super) const DOWNLOAD_LONG_ABOUT: &str = "\
Pull a remote subtree into a local directory

Empty nodes become directories and are created if missing. For nodes with a payload
the node's modification time is compared with the local file's:

  - local file missing: written
  - remote newer: overwritten
  - same timestamp: left alone
  - local newer: left alone, with a warning

Written files get the node's modification time, so an unchanged tree downloads
without writing anything the second time. Files are replaced atomically.

If the remote root does not exist this is reported and the command succeeds without
writing anything.

EXAMPLES:

  $ zktree download /fleet/conf /etc/fleet
";

pub(super) const DELETE_LONG_ABOUT: &str = "\
Recursively remove a remote subtree

Children are deleted before their parents. Every delete is conditioned on the version
read when the node was listed; a node modified concurrently stops the run. A missing
subtree is reported and the command succeeds. The namespace root cannot be deleted.

EXAMPLES:

  $ zktree delete /fleet/old-conf
";
