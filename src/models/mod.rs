mod user;

pub use user::{
    NewUser, NewUserRow, PageRequest, User, UserChanges, UserFilter, UserRow, UserStatus,
};
