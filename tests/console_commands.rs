use hbnb::console::{Console, Control};
use hbnb::store::{Database, PersistenceMode};
use serde_json::{json, Value};

fn run(db: &Database, lines: &[&str]) -> String {
    let mut console = Console::new(db, Vec::new());
    for line in lines {
        console.onecmd(line).unwrap();
    }
    String::from_utf8(console.into_output()).unwrap()
}

fn create(db: &Database, class: &str) -> String {
    run(db, &[&format!("create {class}")]).trim().to_string()
}

fn attribute(db: &Database, key: &str, name: &str) -> Option<Value> {
    db.object_keeper().unwrap().get(key).and_then(|e| e.get(name))
}

#[test]
fn create_prints_an_id_and_show_renders_it() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "User");
    assert_eq!(id.len(), 36);
    assert_eq!(db.saves().unwrap(), 1);

    let shown = run(&db, &[&format!("show User {id}")]);
    assert!(shown.starts_with(&format!("[User] ({id}) {{'id': '{id}', 'created_at': datetime.datetime(")));
    assert!(shown.ends_with("}\n"));
}

#[test]
fn create_rejections() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let output = run(&db, &["create", "create MyModel"]);
    assert_eq!(output, "** class name missing **\n** class doesn't exist **\n");
    assert!(db.object_keeper().unwrap().is_empty());
    assert_eq!(db.saves().unwrap(), 0);
}

#[test]
fn show_and_destroy_validate_in_order() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    for command in ["show", "destroy"] {
        let output = run(
            &db,
            &[
                command,
                &format!("{command} Nope"),
                &format!("{command} User"),
                &format!("{command} User 1234"),
            ],
        );
        assert_eq!(
            output,
            "** class name missing **\n** class doesn't exist **\n** instance id missing **\n** no instance found **\n"
        );
    }
}

#[test]
fn destroy_removes_and_saves() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "Place");
    let output = run(&db, &[&format!("destroy Place {id}"), &format!("show Place {id}")]);
    assert_eq!(output, "** no instance found **\n");
    assert_eq!(db.saves().unwrap(), 2);
    assert!(db.object_keeper().unwrap().is_empty());
}

#[test]
fn all_filters_by_class_and_keeps_creation_order() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    assert_eq!(run(&db, &["all"]), "[]\n");
    let first = create(&db, "State");
    let _city = create(&db, "City");
    let second = create(&db, "State");

    let states = run(&db, &["all State"]);
    assert!(states.starts_with(&format!("[\"[State] ({first})")));
    let first_at = states.find(&first).unwrap();
    let second_at = states.find(&second).unwrap();
    assert!(first_at < second_at);
    assert!(!states.contains("[City]"));

    let everything = run(&db, &["all"]);
    assert_eq!(everything.matches("\"[").count(), 3);
    assert_eq!(run(&db, &["all Nope"]), "** class doesn't exist **\n");
}

#[test]
fn count_per_class() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    create(&db, "Amenity");
    create(&db, "Amenity");
    create(&db, "Review");
    let output = run(&db, &["count Amenity", "count Review", "count User", "count", "count Nope"]);
    assert_eq!(
        output,
        "2\n1\n0\n** class name missing **\n** class doesn't exist **\n"
    );
}

#[test]
fn update_casts_values() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "Place");
    let key = format!("Place.{id}");
    let output = run(
        &db,
        &[
            &format!("update Place {id} name \"My little house\""),
            &format!("update Place {id} number_rooms \"4\""),
            &format!("update Place {id} latitude 37.77"),
            &format!("update Place {id} max_guest abc"),
            &format!("update Place {id} rating 7"),
            &format!("update Place {id} ratio 0.5"),
            &format!("update Place {id} nickname cottage"),
        ],
    );
    assert_eq!(output, "");
    assert_eq!(attribute(&db, &key, "name"), Some(json!("My little house")));
    assert_eq!(attribute(&db, &key, "number_rooms"), Some(json!(4)));
    assert_eq!(attribute(&db, &key, "latitude"), Some(json!(37.77)));
    assert_eq!(attribute(&db, &key, "max_guest"), Some(json!("abc")));
    assert_eq!(attribute(&db, &key, "rating"), Some(json!(7)));
    assert_eq!(attribute(&db, &key, "ratio"), Some(json!(0.5)));
    assert_eq!(attribute(&db, &key, "nickname"), Some(json!("cottage")));

    let shown = run(&db, &[&format!("show Place {id}")]);
    assert!(shown.contains("'name': 'My little house', 'number_rooms': 4, 'latitude': 37.77"));
}

#[test]
fn update_refreshes_updated_at() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "User");
    let key = format!("User.{id}");
    let before = db.object_keeper().unwrap().get(&key).unwrap().updated_at();
    run(&db, &[&format!("update User {id} first_name \"Betty\"")]);
    let after = db.object_keeper().unwrap().get(&key).unwrap().updated_at();
    assert!(after > before);
    assert_eq!(db.saves().unwrap(), 2);
}

#[test]
fn update_validates_in_order() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "City");
    let output = run(
        &db,
        &[
            "update",
            "update Missing_Class",
            "update City",
            "update City 1234",
            &format!("update City {id}"),
            &format!("update City {id} name"),
        ],
    );
    assert_eq!(
        output,
        "** class name missing **\n\
         ** class doesn't exist **\n\
         ** instance id missing **\n\
         ** no instance found **\n\
         ** attribute name missing **\n\
         ** value missing **\n"
    );
    assert_eq!(db.saves().unwrap(), 1);
}

#[test]
fn reserved_attributes_are_left_alone() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let id = create(&db, "BaseModel");
    let key = format!("BaseModel.{id}");
    let output = run(
        &db,
        &[
            &format!("update BaseModel {id} id \"other\""),
            &format!("update BaseModel {id} created_at \"yesterday\""),
        ],
    );
    assert_eq!(output, "");
    assert_eq!(attribute(&db, &key, "id"), Some(json!(id)));
    assert!(db.object_keeper().unwrap().contains(&key));
    assert_eq!(db.saves().unwrap(), 1);
}

#[test]
fn unknown_input_is_reported() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let output = run(&db, &["hello world", "User.fly()", "  ", ""]);
    assert_eq!(output, "*** Unknown syntax: hello world\n*** Unknown syntax: User.fly()\n");
}

#[test]
fn help_lists_and_describes_commands() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let listing = run(&db, &["help"]);
    assert!(listing.starts_with("\nDocumented commands (type help <topic>):\n"));
    assert!(listing.contains("EOF  all  count  create  destroy  help  quit  show  update"));

    assert_eq!(run(&db, &["help quit"]), "Quit command to exit the program.\n");
    assert_eq!(run(&db, &["?quit"]), "Quit command to exit the program.\n");
    assert_eq!(run(&db, &["help fly"]), "*** No help on fly\n");
}

#[test]
fn quit_and_eof_end_the_session() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let mut console = Console::new(&db, Vec::new());
    assert_eq!(console.onecmd("quit").unwrap(), Control::Exit);
    assert_eq!(console.onecmd("EOF").unwrap(), Control::Exit);
    assert_eq!(console.onecmd("count User").unwrap(), Control::Continue);
    let output = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(output, "\n0\n");
}

#[test]
fn cmdloop_runs_until_end_of_input() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let input = "create State\ncount State\n";
    let mut console = Console::new(&db, Vec::new());
    console.cmdloop(input.as_bytes(), false).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1");
    assert_eq!(lines[2], "");
}

#[test]
fn cmdloop_stops_at_quit_and_prompts_when_interactive() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let input = "quit\ncreate State\n";
    let mut console = Console::new(&db, Vec::new());
    console.cmdloop(input.as_bytes(), true).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(output, "(hbnb) ");
    assert!(db.object_keeper().unwrap().is_empty());
}

#[test]
fn invalid_utf8_line_does_not_end_the_session() {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    let input: &[u8] = b"create State\nshow \xff\ncount State\n";
    let mut console = Console::new(&db, Vec::new());
    console.cmdloop(input, false).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "** class doesn't exist **");
    assert_eq!(lines[2], "1");
    assert_eq!(lines[3], "");
}
