//! English message catalogue
//!
//! Templates and flash messages refer to strings by dotted key; unknown keys
//! render as the key itself so a missing entry is visible on the page.

/// Looks up `key`, falling back to the key
pub fn translate(key: &str) -> &str {
    lookup(key).unwrap_or(key)
}

/// Template function `t(key)`
pub fn t(key: &str) -> String {
    translate(key).to_string()
}

pub fn lookup(key: &str) -> Option<&'static str> {
    let text = match key {
        "appName" => "Task manager",

        "flash.session.create.success" => "You are logged in",
        "flash.session.create.error" => "Wrong email or password",
        "flash.session.delete.success" => "You are logged out",
        "flash.authError" => "Access denied! Please sign in.",

        "flash.users.permissionDenied" => "You cannot edit or delete another user.",
        "flash.users.create.success" => "User registered successfully",
        "flash.users.create.error" => "Failed to register",
        "flash.users.edit.success" => "User updated successfully",
        "flash.users.edit.error" => "Failed to update user",
        "flash.users.delete.success" => "User deleted successfully",
        "flash.users.delete.error" => "Failed to delete user",

        "flash.statuses.create.success" => "Status created successfully",
        "flash.statuses.create.error" => "Failed to create status",
        "flash.statuses.edit.success" => "Status updated successfully",
        "flash.statuses.edit.error" => "Failed to update status",
        "flash.statuses.delete.success" => "Status deleted successfully",
        "flash.statuses.delete.error" => "Failed to delete status",

        "flash.labels.create.success" => "Label created successfully",
        "flash.labels.create.error" => "Failed to create label",
        "flash.labels.edit.success" => "Label updated successfully",
        "flash.labels.edit.error" => "Failed to update label",
        "flash.labels.delete.success" => "Label deleted successfully",
        "flash.labels.delete.error" => "Failed to delete label",

        "flash.tasks.create.success" => "Task created successfully",
        "flash.tasks.create.error" => "Failed to create task",
        "flash.tasks.edit.success" => "Task updated successfully",
        "flash.tasks.edit.error" => "Failed to update task",
        "flash.tasks.delete.success" => "Task deleted successfully",
        "flash.tasks.delete.error" => "Failed to delete task",

        "layouts.application.users" => "Users",
        "layouts.application.signIn" => "Sign in",
        "layouts.application.signUp" => "Sign up",
        "layouts.application.signOut" => "Sign out",
        "layouts.application.statuses" => "Statuses",
        "layouts.application.labels" => "Labels",
        "layouts.application.tasks" => "Tasks",

        "views.welcome.index.hello" => "Hello!",
        "views.welcome.index.description" => "Keep track of tasks, statuses and labels",

        "views.sessions.email" => "Email",
        "views.sessions.password" => "Password",
        "views.sessions.new.signIn" => "Sign in",
        "views.sessions.new.submit" => "Sign in",

        "views.users.id" => "ID",
        "views.users.firstName" => "First name",
        "views.users.lastName" => "Last name",
        "views.users.fullName" => "Full name",
        "views.users.email" => "Email",
        "views.users.password" => "Password",
        "views.users.createdAt" => "Created at",
        "views.users.actions" => "Actions",
        "views.users.new.signUp" => "Sign up",
        "views.users.new.submit" => "Save",
        "views.users.edit.title" => "Edit user",
        "views.users.edit.submit" => "Update",
        "views.users.edit.link" => "Edit",
        "views.users.delete.submit" => "Delete",

        "views.statuses.title" => "Statuses",
        "views.statuses.id" => "ID",
        "views.statuses.name" => "Name",
        "views.statuses.createdAt" => "Created at",
        "views.statuses.actions" => "Actions",
        "views.statuses.create" => "Create status",
        "views.statuses.new.title" => "New status",
        "views.statuses.new.submit" => "Create",
        "views.statuses.edit.title" => "Edit status",
        "views.statuses.edit.submit" => "Update",
        "views.statuses.edit.link" => "Edit",
        "views.statuses.delete.submit" => "Delete",

        "views.labels.title" => "Labels",
        "views.labels.id" => "ID",
        "views.labels.name" => "Name",
        "views.labels.createdAt" => "Created at",
        "views.labels.actions" => "Actions",
        "views.labels.create" => "Create label",
        "views.labels.new.title" => "New label",
        "views.labels.new.submit" => "Create",
        "views.labels.edit.title" => "Edit label",
        "views.labels.edit.submit" => "Update",
        "views.labels.edit.link" => "Edit",
        "views.labels.delete.submit" => "Delete",

        "views.tasks.title" => "Tasks",
        "views.tasks.id" => "ID",
        "views.tasks.name" => "Name",
        "views.tasks.description" => "Description",
        "views.tasks.statusId" => "Status",
        "views.tasks.author" => "Author",
        "views.tasks.executorId" => "Executor",
        "views.tasks.labels" => "Labels",
        "views.tasks.createdAt" => "Created at",
        "views.tasks.actions" => "Actions",
        "views.tasks.create" => "Create task",
        "views.tasks.new.title" => "New task",
        "views.tasks.new.submit" => "Create",
        "views.tasks.edit.title" => "Edit task",
        "views.tasks.edit.submit" => "Update",
        "views.tasks.edit.link" => "Edit",
        "views.tasks.delete.submit" => "Delete",
        "views.tasks.filter.statusId" => "Status",
        "views.tasks.filter.executorId" => "Executor",
        "views.tasks.filter.label" => "Label",
        "views.tasks.filter.isCreatorUser" => "Only my tasks",
        "views.tasks.filter.show" => "Show",

        _ => return None,
    };
    Some(text)
}
