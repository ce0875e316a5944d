/*!

This is the long-form manual for `student_voting` and the `urna` command line tool.

## The data

A collection of elections is stored as one JSON array. Each election looks like:

```json
{
  "id": "5f0c3f8e-2b7a-4c55-9d1e-7f6a3c1b2d90",
  "title": "Student council 2024",
  "description": "Yearly election of the student council",
  "startDate": "2024-05-01T10:00:00Z",
  "endDate": "",
  "chapas": [
    { "id": "chapa-1", "name": "Blue", "number": 1 },
    { "id": "chapa-2", "name": "Green", "number": 2 }
  ],
  "votes": { "chapa-1": 1, "chapa-2": 0 },
  "voters": [
    { "name": "Ana", "cpf": "11144477735", "votedAt": "2024-05-01T12:30:00Z" }
  ],
  "status": "open"
}
```

The field names are the ones of the first (browser based) version of the
system, so its backups can be imported as they are. An empty `endDate` means
that no end date was set. Dates without a timezone (`2024-05-01T10:00`) are
read as UTC. A slate missing from `votes` (elections saved before their first
vote carry `"votes": {}`) gets a count of 0 when the data is read.

## Rules

- A CPF votes once. The check covers all the elections of the collection, not
  only the open one.
- The CPF is only checked for its length (11 digits). Check digits are not
  verified.
- By default only one election may be open. `urna` refuses to create a new one
  until the current one is closed. This can be relaxed with
  `"singleOpenElection": false` in the configuration, in which case the first
  open election in the collection receives the votes.
- Slates are ranked by number of votes. Slates with the same number of votes
  keep the ballot order, and the first one is reported as the winner.

## Using `urna`

A voting session:

```bash
urna identify --name "Ana Souza" --cpf 111.444.777-35
urna ballot
urna vote --slate 2
```

`--slate` takes the ballot number or the slate id (`chapa-2`).

Administration:

```bash
urna login --username admin --password admin123
urna create --title "Student council" --description "Yearly vote" \
  --slate Blue --slate Green
urna list
urna results <election id>
urna report summary --out summary.txt
urna report results --election <election id> --out results.csv
urna report voters --election <election id> --out voters.csv
urna close <election id>
urna export --out backup.json
urna import backup.json
urna logout
```

`urna wipe --yes` removes all the elections and the session. There is no undo.

## Configuration

`urna --config urna.json ...` reads a JSON file such as:

```json
{
  "storePath": "/var/lib/urna/store.json",
  "sessionPath": "/tmp/urna-session.json",
  "admin": { "username": "admin", "password": "admin123" },
  "rules": { "minSlates": 2, "singleOpenElection": true }
}
```

All the fields are optional. `--store` overrides `storePath`. Logging is
controlled with `--verbose` or the `RUST_LOG` environment variable.

*/
