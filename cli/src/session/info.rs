//! Static shell output: banner, help, settings and the gopher.

use colored::Colorize;

use super::CLISession;
use crate::align::ColumnWriter;

const HELP: &str = "Usage:
        connect <host:port>   connects to another node specified by host:port
        auth                  prompts for username and password
        pretty                toggles pretty print for the json format
        chunked               turns on chunked responses from server
        chunk size <size>     sets the size of the chunked responses.  Set to 0 to reset to the default chunked size
        use <db_name>         sets current database
        format <format>       specifies the format of the server responses: json, csv, or column
        precision <format>    specifies the format of the timestamp: rfc3339, h, m, s, ms, u or ns
        consistency <level>   sets write consistency level: any, one, quorum, or all
        history               displays command history
        settings              outputs the current settings for the shell
        clear                 clears settings such as database or retention policy.  run 'clear' for help
        exit/quit/ctrl+d      quits the influx shell

        show databases        show database names
        show series           show series information
        show measurements     show measurement information
        show tag keys         show tag key information
        show field keys       show field key information

        A full list of influxql commands can be found at:
        https://docs.influxdata.com/influxdb/latest/query_language/spec/
";

const GOPHER: &str = r#"
                                          .-::-::://:-::-    .:/++/'
                                     '://:-''/oo+//++o+/.://o-    ./+:
                                  .:-.    '++-         .o/ '+yydhy'  o-
                               .:/.      .h:         :osoys  .smMN-  :/
                            -/:.'        s-         /MMMymh.   '/y/  s'
                         -+s:''''        d          -mMMms//     '-/o:
                       -/++/++/////:.    o:          '... s-        :s.
                     :+-+s-'       ':/'  's-             /+          'o:
                   '+-'o:        /ydhsh.  '//.        '-o-             o-
                  .y. o:        .MMMdm+y    ':+++:::/+:.'               s:
                .-h/  y-        'sdmds'h -+ydds:::-.'                   'h.
             .//-.d'  o:          '.' 'dsNMMMNh:.:++'                    :y
            +y.  'd   's.            .s:mddds:     ++                     o/
           'N-  odd    'o/.       './o-s-'   .---+++'                      o-
           'N'  yNd      .://:/:::::. -s   -+/s/./s'                       'o/'
            so'  .h         ''''       ////s: '+. .s                         +y'
             os/-.y'                       's' 'y::+                          +d'
               '.:o/                        -+:-:.'                            so.---.'
                   o'                                                          'd-.''/s'
                   .s'                                                          :y.''.y
                    -s                                                           mo:::'
                     ::                                                          yh
                      //                                      ''''               /M'
                       o+                                    .s///:/.            'N:
                        :+                                   /:    -s'            ho
                         's-                               -/s/:+/.+h'            +h
                           ys'                            ':'    '-.              -d
                            oh                                                    .h
                             /o                                                   .s
                              s.                                                  .h
                              -y                                                  .d
                               m/                                                 -h
                               +d                                                 /o
                               'N-                                                y:
                                h:                                                m.
                                s-                                               -d
                                o-                                               s+
                                +-                                              'm'
                                s/                                              oo--.
                                y-                                             /s  ':+'
                                s'                                           'od--' .d:
                                -+                                         ':o: ':+-/+
                                 y-                                      .:+-      '
                                //o-                                 '.:+/.
                                .-:+/'                           ''-/+/.
                                    ./:'                    ''.:o+/-'
                                      .+o:/:/+-'      ''.-+ooo/-'
                                         o:   -h///++////-.
                                        /:   .o/
                                       //+  'y
                                       ./sooy.
"#;

impl CLISession {
    /// Connection line and shell version shown when the prompt starts
    pub(super) fn print_banner(&mut self) {
        let addr = self.addr();
        if self.server_version.is_empty() {
            let warning = format!("WARN: Connected to {}, but found no server version.", addr);
            let warning = if self.color {
                warning.yellow().to_string()
            } else {
                warning
            };
            self.println(warning);
            self.println("Are you sure an InfluxDB server is listening at the given address?");
        } else {
            let connected = format!("Connected to {} version {}", addr, self.server_version);
            let connected = if self.color {
                connected.green().to_string()
            } else {
                connected
            };
            self.println(connected);
        }
        self.version();
    }

    pub(super) fn version(&mut self) {
        let line = format!("InfluxDB shell version: {}", self.client_version);
        self.println(line);
    }

    pub(super) fn help(&mut self) {
        self.print(HELP);
    }

    pub(super) fn gopher(&mut self) {
        self.print(GOPHER);
    }

    /// Two aligned columns of the current settings, then a blank line
    pub(super) fn settings(&mut self) {
        let state = &self.state;
        let rows = [
            ("URL", state.url_display()),
            ("Username", state.username.clone()),
            ("Database", state.database.clone()),
            ("RetentionPolicy", state.retention_policy.clone()),
            ("Pretty", state.pretty.to_string()),
            ("Format", state.format.to_string()),
            ("Write Consistency", state.write_consistency.clone()),
            ("Chunked", state.chunked.to_string()),
            ("Chunk Size", state.chunk_size.to_string()),
        ];

        let mut writer = ColumnWriter::new(0, 1);
        writer.write_line("Setting\tValue");
        writer.write_line("--------\t--------");
        for (name, value) in rows {
            writer.write_line(&format!("{}\t{}", name, value));
        }
        writer.write_line("");

        let rendered = writer.flush();
        self.print(&rendered);
    }
}
