/// 每用户最大并发会话数
pub const MAX_SESSIONS_PER_USER: usize = 10;

/// 列表接口默认分页大小
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// 列表接口最大分页大小
pub const MAX_PAGE_SIZE: u64 = 100;

/// 复习队列默认返回数量
pub const DEFAULT_REVIEW_LIMIT: usize = 50;

/// 复习队列最大返回数量
pub const MAX_REVIEW_LIMIT: usize = 200;

/// 调用方未提供 quality 时的默认评分（对应"正确且不费力"）
pub const DEFAULT_REVIEW_QUALITY: i64 = 4;
